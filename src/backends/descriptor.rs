//! Minimal HID report-descriptor walker.
//!
//! Only what validation needs: the top-level usage and the input report
//! length. The length follows the Windows convention of counting the report
//! id byte (zero when the device does not use report ids), so a DualShock 4
//! over USB comes out at 64 on every platform.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Top-level facts pulled out of a report descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescriptorSummary {
    pub usage_page: u16,
    pub usage: u16,
    /// Longest input report in bytes, report id byte included.
    pub input_report_len: u16,
}

#[derive(Debug, Clone, Copy, Default)]
struct Globals {
    usage_page: u16,
    report_size: u32,
    report_count: u32,
    report_id: u8,
}

// Item prefixes with the size bits masked off.
const INPUT: u8 = 0x80;
const COLLECTION: u8 = 0xA0;
const USAGE_PAGE: u8 = 0x04;
const REPORT_SIZE: u8 = 0x74;
const REPORT_ID: u8 = 0x84;
const REPORT_COUNT: u8 = 0x94;
const PUSH: u8 = 0xA4;
const POP: u8 = 0xB4;
const USAGE: u8 = 0x08;
const LONG_ITEM: u8 = 0xFE;

pub fn summarize(desc: &[u8]) -> Result<DescriptorSummary> {
    let mut globals = Globals::default();
    let mut stack: Vec<Globals> = Vec::new();
    let mut input_bits: BTreeMap<u8, u32> = BTreeMap::new();
    let mut top: Option<(u16, u16)> = None;
    let mut pending_usage: Option<u16> = None;

    let mut i = 0;
    while i < desc.len() {
        let prefix = desc[i];

        if prefix == LONG_ITEM {
            let len = *desc
                .get(i + 1)
                .ok_or_else(|| truncated(i))? as usize;
            i += 3 + len;
            continue;
        }

        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let data = desc
            .get(i + 1..i + 1 + size)
            .ok_or_else(|| truncated(i))?;
        let value = data
            .iter()
            .rev()
            .fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
        i += 1 + size;

        match prefix & 0xFC {
            USAGE_PAGE => globals.usage_page = value as u16,
            REPORT_SIZE => globals.report_size = value,
            REPORT_COUNT => globals.report_count = value,
            REPORT_ID => globals.report_id = value as u8,
            PUSH => stack.push(globals),
            POP => {
                globals = stack
                    .pop()
                    .ok_or_else(|| Error::Backend("report descriptor: unbalanced pop".into()))?;
            }
            USAGE => {
                // A 4-byte usage carries its own page in the high half.
                pending_usage = Some(value as u16);
            }
            COLLECTION => {
                if top.is_none() {
                    top = Some((globals.usage_page, pending_usage.unwrap_or(0)));
                }
                pending_usage = None;
            }
            INPUT => {
                let bits = globals.report_size.saturating_mul(globals.report_count);
                let total = input_bits.entry(globals.report_id).or_insert(0);
                *total = total.saturating_add(bits);
                pending_usage = None;
            }
            _ => {}
        }
    }

    let longest = input_bits.values().copied().max().unwrap_or(0);
    let bytes = longest.div_ceil(8) + u32::from(longest > 0);
    let (usage_page, usage) = top.unwrap_or_default();

    Ok(DescriptorSummary {
        usage_page,
        usage,
        input_report_len: u16::try_from(bytes)
            .map_err(|_| Error::Backend("report descriptor: input report too long".into()))?,
    })
}

fn truncated(at: usize) -> Error {
    Error::Backend(format!("report descriptor truncated at byte {at}"))
}
