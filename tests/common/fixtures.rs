#![allow(dead_code)]

use formpress::SubmittedValues;

/// 1x1 PNG.
pub const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const HANDOVER_YAML: &str = "\
form_id: handover
title: Device handover
fields:
  - name: user
    type: text
    in_filename: true
  - name: notebook
    type: text
  - name: signature
    type: signature
";

pub const EQUIPMENT_YAML: &str = "\
form_id: equipment
title: Equipment request
pdf_template: wide.json
fields:
  - name: employee
    label: Employee
    in_filename: true
  - name: department
    label: Department
    in_filename: true
  - name: items
    label: Items
    type: select
    multiple: true
    options: [Laptop, Mouse, Headset]
  - name: date
    label: Date
    type: date
    default: today
";

/// Legacy definition: id from the file stem, layout from the `pdf` section.
pub const LEGACY_YAML: &str = "\
title: Return slip
fields:
  - name: user
  - name: serial
  - name: sig
    type: image
    width: 40
pdf:
  title: Device return
  fields:
    - field: serial
      label: Serial number
    - field: user
      label: Returned by
    - field: sig
      label: Signature
      type: image
";

pub fn signature_payload() -> String {
    format!("data:image/png;base64,{}", PIXEL_PNG)
}

pub fn handover_values() -> SubmittedValues {
    SubmittedValues::new()
        .with("user", "Max Muster")
        .with("notebook", "ThinkPad X1")
        .with("signature", signature_payload())
}
