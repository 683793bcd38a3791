// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field module — anchor detection, field growth, template pipeline and JSON
// records.

pub mod corners;
pub mod expand;
pub mod record;
pub mod template;

pub use corners::find_bounding_boxes;
pub use expand::expand_children;
pub use record::{FieldRecord, field_records, read_field_records, write_field_records};
pub use template::{extract_template_fields, map_colors, occlusion_mask};
