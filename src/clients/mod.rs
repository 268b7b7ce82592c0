pub mod row_processor_client;

pub use row_processor_client::{
    HttpRowProcessor, ProcessRequest, ProcessResponse, RemoteError, RemoteProcessor,
};
