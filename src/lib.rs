// SPDX-License-Identifier: Apache-2.0

pub mod bounded_channel;
pub mod component;
pub mod featuregate;
pub mod init;
pub mod receivers;
pub mod telemetry;
pub mod topology;
