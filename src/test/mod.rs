/*
    mkdeb - Rust library for assembling Debian binary packages
    Copyright (C) 2023  NotSludgeBomb

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU General Public License as published by
    the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU General Public License for more details.

    You should have received a copy of the GNU General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use chrono::{DateTime, TimeZone, Utc};

mod archive;
mod control;

// Fixed timestamp, so archives come out the same on every run
fn test_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 6, 15, 12, 30, 0).unwrap()
}
