mod codec;
mod envelope;
mod exchange;
