pub mod buffer_player;
pub mod mul_add;

pub use buffer_player::{BufferPlayer, PlaybackState};
pub use mul_add::MulAdd;
