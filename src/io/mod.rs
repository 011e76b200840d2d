pub mod archive;
pub mod fasta;
pub mod features;
pub mod table;
