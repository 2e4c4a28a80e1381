pub mod district;
pub mod log_entry;
pub mod order;
