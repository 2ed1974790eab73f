mod permission;
mod playback;
mod support;
