pub mod receipt_writer;
pub mod script_reader;
