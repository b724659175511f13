// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Subnet-pool capacity accounting.
//!
//! For a pool prefix of length `m0` and a requested sub-allocation length `L`:
//! total is `2^(L - m0)`, used counts allocations of exactly length `L` that
//! overlap the pool, and free is computed on the address set left once every
//! overlapping allocation is removed from the pool. Prefixes are compared as
//! address ranges, never as strings.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnetwork::IpNetwork;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub fn width(self) -> u32 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }

    pub fn ip_version(self) -> u8 {
        match self {
            Family::V4 => 4,
            Family::V6 => 6,
        }
    }
}

/// A CIDR prefix normalized to its network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    network: IpNetwork,
}

impl Prefix {
    pub fn family(&self) -> Family {
        match self.network {
            IpNetwork::V4(_) => Family::V4,
            IpNetwork::V6(_) => Family::V6,
        }
    }

    pub fn bits(&self) -> u32 {
        u32::from(self.network.prefix())
    }

    /// First address of the range, as an integer.
    pub fn first(&self) -> u128 {
        match self.network.network() {
            IpAddr::V4(addr) => u128::from(u32::from(addr)),
            IpAddr::V6(addr) => u128::from(addr),
        }
    }

    /// Last address of the range, as an integer.
    pub fn last(&self) -> u128 {
        self.first() | host_mask(self.family(), self.bits())
    }

    pub fn overlaps(&self, other: &Prefix) -> bool {
        self.family() == other.family() && self.first() <= other.last() && other.first() <= self.last()
    }
}

impl FromStr for Prefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_prefix(s)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.network)
    }
}

pub fn parse_prefix(value: &str) -> Result<Prefix> {
    let malformed = |reason: String| Error::MalformedPrefix {
        value: value.to_string(),
        reason,
    };
    let parsed = IpNetwork::from_str(value.trim()).map_err(|e| malformed(e.to_string()))?;
    let network = IpNetwork::new(parsed.network(), parsed.prefix()).map_err(|e| malformed(e.to_string()))?;
    Ok(Prefix { network })
}

fn host_mask(family: Family, bits: u32) -> u128 {
    match family {
        Family::V4 => u128::from(u32::MAX.checked_shr(bits).unwrap_or(0)),
        Family::V6 => u128::MAX.checked_shr(bits).unwrap_or(0),
    }
}

fn pow2(exponent: u32) -> f64 {
    2f64.powi(i32::try_from(exponent).unwrap_or(i32::MAX))
}

/// Disjoint, sorted address ranges of one family.
#[derive(Debug, Clone)]
struct RangeSet {
    family: Family,
    ranges: Vec<(u128, u128)>,
}

impl RangeSet {
    fn from_prefix(prefix: &Prefix) -> Self {
        Self {
            family: prefix.family(),
            ranges: vec![(prefix.first(), prefix.last())],
        }
    }

    fn remove(&mut self, prefix: &Prefix) {
        if prefix.family() != self.family {
            return;
        }
        let (cut_first, cut_last) = (prefix.first(), prefix.last());
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for &(first, last) in &self.ranges {
            if cut_last < first || cut_first > last {
                kept.push((first, last));
                continue;
            }
            if first < cut_first {
                kept.push((first, cut_first - 1));
            }
            if last > cut_last {
                kept.push((cut_last + 1, last));
            }
        }
        self.ranges = kept;
    }

    /// Decompose into maximal aligned prefixes and return their lengths.
    fn prefix_lengths(&self) -> Vec<u32> {
        let width = self.family.width();
        let mut lengths = Vec::new();
        for &(first, last) in &self.ranges {
            let mut start = first;
            loop {
                let mut size = start.trailing_zeros().min(width);
                let block_end = loop {
                    let mask = host_mask(self.family, width - size);
                    match start.checked_add(mask) {
                        Some(end) if end <= last => break end,
                        _ => size -= 1,
                    }
                };
                lengths.push(width - size);
                if block_end >= last {
                    break;
                }
                start = block_end + 1;
            }
        }
        lengths
    }
}

/// Number of length-`length` subnets the pool prefix can hold.
pub fn total_subnets(pool: &Prefix, length: u32) -> f64 {
    pow2(length.saturating_sub(pool.bits()))
}

/// Allocations of exactly `length` bits that overlap the pool prefix.
pub fn used_subnets(pool: &Prefix, allocations: &[Prefix], length: u32) -> f64 {
    allocations
        .iter()
        .filter(|allocation| pool.overlaps(allocation) && allocation.bits() == length)
        .count() as f64
}

/// Length-`length` subnets still available in the pool prefix once every
/// overlapping allocation, of any size, is taken out.
pub fn free_subnets(pool: &Prefix, allocations: &[Prefix], length: u32) -> f64 {
    free_from_blocks(&free_blocks(pool, allocations), length)
}

fn free_blocks(pool: &Prefix, allocations: &[Prefix]) -> Vec<u32> {
    let mut remaining = RangeSet::from_prefix(pool);
    for allocation in allocations {
        remaining.remove(allocation);
    }
    remaining.prefix_lengths()
}

fn free_from_blocks(blocks: &[u32], length: u32) -> f64 {
    blocks
        .iter()
        .filter(|&&bits| bits <= length)
        .map(|&bits| pow2(length - bits))
        .sum()
}

/// Capacity figures for one pool prefix at one sub-allocation length.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixUsage {
    pub prefix: Prefix,
    pub prefix_length: u32,
    pub total: f64,
    pub used: f64,
    pub free: f64,
}

#[derive(Debug, Clone)]
pub struct AddressPool {
    pub prefixes: Vec<Prefix>,
    pub min_prefix_length: u32,
    pub max_prefix_length: u32,
    pub allocations: Vec<Prefix>,
}

impl AddressPool {
    /// Usage of every pool prefix for every allowed length, in prefix then
    /// length order. Lengths shorter than the prefix itself or longer than
    /// the address family are skipped.
    pub fn usage(&self) -> Vec<PrefixUsage> {
        let mut usage = Vec::new();
        for prefix in &self.prefixes {
            let blocks = free_blocks(prefix, &self.allocations);
            for length in self.min_prefix_length..=self.max_prefix_length {
                if length < prefix.bits() || length > prefix.family().width() {
                    continue;
                }
                usage.push(PrefixUsage {
                    prefix: *prefix,
                    prefix_length: length,
                    total: total_subnets(prefix, length),
                    used: used_subnets(prefix, &self.allocations, length),
                    free: free_from_blocks(&blocks, length),
                });
            }
        }
        usage
    }
}
