// Batch standardization pipeline over showtime extracts.

pub mod processing;
