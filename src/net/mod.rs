pub mod acceptor;

pub use acceptor::TelnetAcceptorTask;
