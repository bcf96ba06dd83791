//! # Time
//!
//! Calendar and clock types shared by the translation handlers.
//!
//! ## Components
//! - **Packed**: the 32-bit bit-field calendar time carried on the wire
//! - **Kinds**: `WowTime` and `HolidayTime`, validated views over a packed time
//! - **Units**: duration newtypes and Unix timestamps with checked conversions
//! - **Zone**: realm zones, the configured `Timezone`, server and realm clocks
//! - **Clock**: `LoopTime`, the per-pump snapshot of every clock

pub mod clock;
pub mod kinds;
pub mod packed;
pub mod units;
pub mod zone;

pub use clock::LoopTime;
pub use kinds::{HolidayTime, WowTime};
pub use packed::{CivilDateTime, Field, PackedFields, PackedTime, TimeKind};
pub use units::{
    Days, Hours, Milliseconds, Minutes, RelativeTime, Seconds, TimeUnit, UnixTime, UnixTime64,
    UnixTimeMs, Weeks,
};
pub use zone::{RealmTime, RealmZone, ServerTime, Timezone};
