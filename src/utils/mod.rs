pub mod dct_ops;
pub mod gray_ops;
pub mod time_label;
