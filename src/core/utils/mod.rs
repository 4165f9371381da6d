/// Fixed-width binary readers
pub mod binary_reader;
/// Fixed-width binary writers
pub mod binary_writer;
pub mod random;
