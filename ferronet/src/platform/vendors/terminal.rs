//! Plain Unix shell profile.

use crate::platform::VendorProfile;

/// Any `$` or `#` terminated shell. No modes and no paging command.
pub fn shell() -> VendorProfile {
    VendorProfile::new("terminal")
        .with_delimiters(&['$', '#'])
        .with_prompt_template(r"[{delimiters}]")
        .without_paging_command()
}
