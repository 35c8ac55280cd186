// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod cat;
pub mod info;
pub mod list;
pub mod readlink;
pub mod stat;
pub mod tree;

pub use cat::cat_command;
pub use info::info_command;
pub use list::list_command;
pub use readlink::readlink_command;
pub use stat::stat_command;
pub use tree::tree_command;
