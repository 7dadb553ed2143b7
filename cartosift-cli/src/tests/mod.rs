//! Shared test harness modules for the Cartosift CLI.

use super::*;

mod helpers;
