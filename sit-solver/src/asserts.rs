#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const SIT_ASSERT_LEVEL_DEFINITION: u8 = SIT_ASSERT_SIMPLE;

#[cfg(any(test, feature = "debug-checks"))]
pub const SIT_ASSERT_LEVEL_DEFINITION: u8 = SIT_ASSERT_ADVANCED;

pub const SIT_ASSERT_SIMPLE: u8 = 1;
pub const SIT_ASSERT_MODERATE: u8 = 2;
pub const SIT_ASSERT_ADVANCED: u8 = 3;

#[macro_export]
#[doc(hidden)]
macro_rules! sit_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::SIT_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SIT_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! sit_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::SIT_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SIT_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! sit_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::asserts::SIT_ASSERT_LEVEL_DEFINITION >= $crate::asserts::SIT_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}
