use termion::style::{Reset, Underline};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use std::fmt;

use crate::{
    Result,
    permissions::PermissionBits,
};

/// Names accepted by [`parse_permissions`], with the bits they map to.
const PERMISSION_NAMES: &[(&str, PermissionBits)] = &[
    ("edit-edition", PermissionBits::EDIT_EDITION),
    ("publish-edition", PermissionBits::PUBLISH_EDITION),
    ("manage-unpublishing", PermissionBits::MANAGE_UNPUBLISHING),
    ("manage-attachments", PermissionBits::MANAGE_ATTACHMENTS),
    ("manage-users", PermissionBits::MANAGE_USERS),
    ("view-restricted", PermissionBits::VIEW_RESTRICTED),
];

/// Parse a comma-separated list of permission names.
pub fn parse_permissions(v: &str) -> Result<PermissionBits> {
    let mut bits = PermissionBits::empty();

    for name in v.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        match PERMISSION_NAMES.iter().find(|(known, _)| *known == name) {
            Some((_, bit)) => bits |= *bit,
            None => failure::bail!("unknown permission: {}", name),
        }
    }

    Ok(bits)
}

/// Render a set of permissions as a comma-separated list of names.
pub fn permission_names(bits: PermissionBits) -> String {
    PERMISSION_NAMES.iter()
        .filter(|(_, bit)| bits.contains(*bit))
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn print_table<H, T, R>(header: H, rows: T)
where
    H: TableRow,
    T: AsRef<[R]>,
    R: TableRow<Size = H::Size>,
{
    let mut widths = vec![0; H::size()];

    for (inx, width) in widths.iter_mut().enumerate().take(H::size()) {
        *width = UnicodeWidthStr::width(header.column(inx));
    }

    for row in rows.as_ref() {
        for (inx, width) in widths.iter_mut().enumerate().take(H::size()) {
            *width = (*width).max(UnicodeWidthStr::width(row.column(inx)));
        }
    }

    // Sum of all longest widths and spaces separating them.
    let total_width = widths.iter().cloned().sum::<usize>() + widths.len() - 1;

    let (terminal_width, _) = termion::terminal_size().unwrap_or((80, 20));
    let terminal_width = usize::from(terminal_width);

    if total_width >= terminal_width {
        let overflow = total_width - terminal_width;
        let last = widths.last_mut().unwrap();

        if overflow < *last {
            *last -= overflow;
        } else {
            panic!("Can't render table: terminal is too small ({} < {})",
                terminal_width, total_width);
        }
    }

    for (inx, width) in widths.iter().enumerate().take(H::size()) {
        if inx > 0 {
            print!(" ");
        }
        print!("{}{}{}",
            Underline, Column(header.column(inx), *width), Reset);
    }
    println!();

    for row in rows.as_ref() {
        for (inx, width) in widths.iter().enumerate().take(H::size()) {
            if inx > 0 {
                print!(" ");
            }
            print!("{}", Column(row.column(inx), *width));
        }
        println!();
    }
}

pub trait TableRow {
    type Size;

    fn size() -> usize;

    fn column(&self, index: usize) -> &str;
}

macro_rules! impl_table_row {
    {
        $(
            $sizeconst:literal $size:ident => $($inx:tt : $ty:ident),+
        );+
        $(;)*
    } => {
        $(
            pub struct $size;

            impl<$($ty),+> TableRow for ($($ty,)+)
            where
                $($ty: AsRef<str>),+
            {
                type Size = $size;

                fn size() -> usize { $sizeconst }

                fn column(&self, index: usize) -> &str {
                    match index {
                        $($inx => self.$inx.as_ref(),)+
                        _ => panic!("Index {} out of range", index),
                    }
                }
            }
        )+
    };
}

impl_table_row! {
    1 One   => 0: A;
    2 Two   => 0: A, 1: B;
    3 Three => 0: A, 1: B, 2: C;
    4 Four  => 0: A, 1: B, 2: C, 3: D;
}

struct Column<'a>(&'a str, usize);

impl<'a> fmt::Display for Column<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let (len, end) = self.0.char_indices()
            .scan(0, |total_len, (inx, chr)| {
                *total_len += UnicodeWidthChar::width(chr).unwrap_or(0);
                if *total_len > self.1 {
                    None
                } else {
                    Some((*total_len, inx + chr.len_utf8()))
                }
            })
            .last()
            .unwrap_or((0, 0));

        let pad = if len >= self.1 {
            0
        } else {
            self.1 - len
        };

        write!(fmt, "{0}{1:2$}", &self.0[..end], "", pad)
    }
}

#[cfg(test)]
mod tests {
    use crate::permissions::PermissionBits;
    use super::{parse_permissions, permission_names};

    #[test]
    fn permission_lists_parse() {
        let bits = parse_permissions("edit-edition, publish-edition").unwrap();

        assert_eq!(bits,
            PermissionBits::EDIT_EDITION | PermissionBits::PUBLISH_EDITION);
    }

    #[test]
    fn unknown_permissions_are_rejected() {
        assert!(parse_permissions("fly-to-the-moon").is_err());
    }

    #[test]
    fn names_round_trip() {
        let bits = PermissionBits::MANAGE_UNPUBLISHING
            | PermissionBits::VIEW_RESTRICTED;

        assert_eq!(parse_permissions(&permission_names(bits)).unwrap(), bits);
    }
}
