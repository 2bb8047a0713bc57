use std::{
    fmt::{Debug, Display},
    ops::{AddAssign, SubAssign},
};

use num_traits::Num;

pub trait MIDINumInto<T> {
    /// Casts the tick type to another supported type.
    ///
    /// ## Example
    /// ```
    ///use midi_splice::num::MIDINumInto;
    ///
    ///let ticks: u32 = 1920;
    ///
    ///let as_u64: u64 = ticks.midi_num_into();
    ///let as_f64: f64 = ticks.midi_num_into();
    ///
    ///assert_eq!(as_u64, 1920u64);
    ///assert_eq!(as_f64, 1920f64);
    /// ```
    fn midi_num_into(&self) -> T;
}

pub trait MIDINumFrom<T> {
    /// Builds the tick type from another supported type.
    ///
    /// ## Example
    /// ```
    ///use midi_splice::num::MIDINumFrom;
    ///
    ///let ticks = u32::midi_num_from(480u64);
    ///let seconds = f64::midi_num_from(480u64);
    ///
    ///assert_eq!(ticks, 480u32);
    ///assert_eq!(seconds, 480f64);
    /// ```
    fn midi_num_from(val: T) -> Self;
}

/// The numeric type used for delta and absolute times.
///
/// Implemented for i32, i64, u32, u64, f32 and f64. Integer types are what files store; float
/// types are useful after time scaling.
pub trait MIDINum:
    Num
    + PartialOrd
    + PartialEq
    + AddAssign
    + SubAssign
    + Copy
    + Sized
    + Debug
    + Display
    + Send
    + Sync
    + MIDINumFrom<u64>
    + MIDINumInto<u64>
    + MIDINumFrom<f64>
    + MIDINumInto<f64>
{
    /// The gap `self - earlier`, clamped at zero so a misordered pair never produces a
    /// negative (or wrapped) delta.
    #[inline(always)]
    fn gap_since(self, earlier: Self) -> Self {
        if self > earlier {
            self - earlier
        } else {
            Self::zero()
        }
    }
}

macro_rules! impl_num_from_to {
    ($from:ident, $to:ident) => {
        impl MIDINumInto<$to> for $from {
            #[inline(always)]
            fn midi_num_into(&self) -> $to {
                *self as $to
            }
        }

        impl MIDINumFrom<$to> for $from {
            #[inline(always)]
            fn midi_num_from(val: $to) -> Self {
                val as $from
            }
        }
    };
}

macro_rules! impl_midi_num {
    ($($num:ident),*) => {
        $(
            impl_num_from_to!($num, u64);
            impl_num_from_to!($num, f64);
            impl MIDINum for $num {}
        )*
    };
}

impl_midi_num!(i32, u32, i64, u64, f32, f64);
