//! SnapWatch Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `SnapshotFile`, `ClientFolder`, `BackupStatus`, `CheckCycleResult`, `Credential`
//! - **Freshness evaluation** - the pure calendar-day rule deciding whether a client backed up today
//! - **Use cases** - `TargetChecker`, `CredentialRefresher`
//! - **Port definitions** - Traits for adapters: `IStorageProvider`, `IAuthProvider`,
//!   `INotificationService`, `ICredentialStore`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
