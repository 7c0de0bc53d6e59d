pub mod playlist_utils;
