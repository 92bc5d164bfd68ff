//! # Ongaku Playlist
//!
//! Final stage of the Ongaku pipeline: derive playlists from geometric
//! shapes drawn through the embedded metric space, and render them as
//! M3U files.
//!
//! - Line sampling and nearest-position assignment ([`space`])
//! - Playlist shapes: nearest, line, cone, inverse cone, cylinder
//!   ([`shapes`])
//! - M3U rendering and writing ([`m3u`])

pub mod m3u;
pub mod shapes;
pub mod space;

pub use shapes::{Playlist, PlaylistBuilder, SweepShape};
pub use space::SongSpace;
