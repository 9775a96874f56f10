pub mod logger;
pub mod spectro_pipeline;
