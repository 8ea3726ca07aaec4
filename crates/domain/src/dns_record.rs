mod rdata;
mod record;
mod record_class;
mod record_type;

pub use rdata::{RData, SoaData};
pub use record::ResourceRecord;
pub use record_class::RecordClass;
pub use record_type::RecordType;
