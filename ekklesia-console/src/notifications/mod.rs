pub mod channel;
pub mod dispatcher;

pub use channel::{ChannelState, NotificationChannel};
pub use dispatcher::{Dispatcher, RefreshCallback, Section};
