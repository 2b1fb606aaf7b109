
pub use greeter_dispatch::greeter_dispatch;
pub use greeter_service::GreeterService;
