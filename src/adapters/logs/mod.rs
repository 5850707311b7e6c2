pub mod rotation_logger;
