/// Title-cases `input` the way Python's `str.title` does: a letter is upper-cased
/// when it follows a non-letter and lower-cased otherwise.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_cased = false;
    for c in input.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

/// Guesses a display name from an address: `jane.doe@corp.com` -> `Jane Doe`.
pub fn name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    title_case(&local.replace('.', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_local_part_becomes_words() {
        assert_eq!(name_from_email("priya.sharma@corp.com"), "Priya Sharma");
        assert_eq!(name_from_email("JOHN.o'neil@corp.com"), "John O'Neil");
    }

    #[test]
    fn non_letters_restart_capitalisation() {
        assert_eq!(title_case("dev_ops team2lead"), "Dev_Ops Team2Lead");
    }

    #[test]
    fn address_without_at_sign_uses_whole_string() {
        assert_eq!(name_from_email("hr.desk"), "Hr Desk");
    }
}
