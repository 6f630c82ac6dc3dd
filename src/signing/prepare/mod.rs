pub mod base_transaction;
pub mod input_selector;
