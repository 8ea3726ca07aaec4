mod query_coalescer;
mod response_assembler;

pub use query_coalescer::{Coalesced, FetchResult, QueryCoalescer};
pub use response_assembler::{ResponseAssembler, MAX_TCP_MESSAGE_LEN};
