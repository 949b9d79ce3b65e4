pub mod dataset_writer;
pub mod worker_pool;
