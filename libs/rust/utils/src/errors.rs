//env
pub const COLLECTOR_CONFIG_NOT_SET: &str = "COLLECTOR_CONFIG not set!";

//config
pub const CONFIG_READ_FAILED: &str = "Failed to read run configuration";
pub const CONFIG_PARSE_FAILED: &str = "Failed to parse run configuration";

//output
pub const OUTPUT_DIR_CREATE_FAILED: &str = "Failed to create output directory";
pub const DATASET_WRITE_FAILED: &str = "Failed to write dataset files";
pub const PRICE_SERIES_WRITE_FAILED: &str = "Failed to write price series file";

//progress
pub const PROGRESS_WRITE_FAILED: &str = "Failed to persist collection progress";
