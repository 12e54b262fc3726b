mod polyhaven;
