pub mod apk;
pub mod avd;
pub mod clean;
pub mod ndk;
