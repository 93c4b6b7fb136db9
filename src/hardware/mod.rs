pub mod air_handler;

pub use self::air_handler::AirHandler;
