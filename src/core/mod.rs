pub mod constants;
pub mod error;
pub mod format;
pub mod frame;
pub mod header;
pub mod packet;
pub mod profile;
pub mod reader;
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;
