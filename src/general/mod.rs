pub mod binning;
pub mod partition;
pub mod scratch;
pub mod slice;
pub mod transport;
