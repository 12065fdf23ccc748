use chrono::{DateTime, Utc};

use crate::models::Revenue;

/// Format an amount in cents as US dollars, e.g. `123456` -> `"$1,234.56"`.
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = abs / 100;
    let remainder = abs % 100;

    format!("{}${}.{:02}", sign, group_thousands(dollars), remainder)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}

/// Format a timestamp the way the dashboard displays dates, e.g. `"Dec 1, 2023"`.
pub fn format_date_to_local(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Labels for the revenue chart's y-axis, from the rounded-up top value down to `$0K`.
///
/// Returns the labels together with the top value (in dollars) that the chart
/// scales its bars against.
pub fn generate_y_axis(revenue: &[Revenue]) -> (Vec<String>, i64) {
    let highest = revenue.iter().map(|r| i64::from(r.revenue)).max().unwrap_or(0);
    let top_label = ((highest + 999) / 1000).max(0) * 1000;

    let labels = (0..=top_label / 1000)
        .rev()
        .map(|k| format!("${}K", k))
        .collect();

    (labels, top_label)
}

/// One entry in a pagination strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(i64),
    Ellipsis,
}

/// Build the list of page links shown beneath a table.
///
/// Up to seven pages are listed in full; beyond that the first and last pages
/// stay visible and the gaps around the current page collapse into ellipses.
pub fn generate_pagination(current_page: i64, total_pages: i64) -> Vec<PageItem> {
    use PageItem::{Ellipsis, Page};

    if total_pages <= 7 {
        return (1..=total_pages).map(Page).collect();
    }

    if current_page <= 3 {
        return vec![Page(1), Page(2), Page(3), Ellipsis, Page(total_pages - 1), Page(total_pages)];
    }

    if current_page >= total_pages - 2 {
        return vec![
            Page(1),
            Page(2),
            Ellipsis,
            Page(total_pages - 2),
            Page(total_pages - 1),
            Page(total_pages),
        ];
    }

    vec![
        Page(1),
        Ellipsis,
        Page(current_page - 1),
        Page(current_page),
        Page(current_page + 1),
        Ellipsis,
        Page(total_pages),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn revenue(month: &str, amount: i32) -> Revenue {
        Revenue {
            id: month.to_lowercase(),
            month: month.to_string(),
            revenue: amount,
        }
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0), "$0.00");
        assert_eq!(format_currency(5), "$0.05");
        assert_eq!(format_currency(4999), "$49.99");
        assert_eq!(format_currency(123_456), "$1,234.56");
        assert_eq!(format_currency(100_000_000), "$1,000,000.00");
    }

    #[test]
    fn currency_keeps_sign() {
        assert_eq!(format_currency(-1), "-$0.01");
        assert_eq!(format_currency(-250_075), "-$2,500.75");
    }

    #[test]
    fn dates_use_short_month() {
        let date = Utc.with_ymd_and_hms(2023, 12, 1, 15, 30, 0).unwrap();
        assert_eq!(format_date_to_local(&date), "Dec 1, 2023");

        let date = Utc.with_ymd_and_hms(2024, 3, 17, 0, 0, 0).unwrap();
        assert_eq!(format_date_to_local(&date), "Mar 17, 2024");
    }

    #[test]
    fn y_axis_rounds_up_to_next_thousand() {
        let data = [revenue("Jan", 2500), revenue("Feb", 1800), revenue("Mar", 3000)];
        let (labels, top) = generate_y_axis(&data);

        assert_eq!(top, 3000);
        assert_eq!(labels, vec!["$3K", "$2K", "$1K", "$0K"]);

        let (labels, top) = generate_y_axis(&[revenue("Jan", 4001)]);
        assert_eq!(top, 5000);
        assert_eq!(labels.first().map(String::as_str), Some("$5K"));
    }

    #[test]
    fn y_axis_empty_revenue() {
        let (labels, top) = generate_y_axis(&[]);
        assert_eq!(top, 0);
        assert_eq!(labels, vec!["$0K"]);
    }

    #[test]
    fn pagination_short_lists_every_page() {
        use PageItem::Page;
        assert_eq!(generate_pagination(1, 0), vec![]);
        assert_eq!(generate_pagination(2, 4), vec![Page(1), Page(2), Page(3), Page(4)]);
    }

    #[test]
    fn pagination_collapses_long_ranges() {
        use PageItem::{Ellipsis, Page};

        assert_eq!(
            generate_pagination(2, 10),
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(9), Page(10)]
        );
        assert_eq!(
            generate_pagination(9, 10),
            vec![Page(1), Page(2), Ellipsis, Page(8), Page(9), Page(10)]
        );
        assert_eq!(
            generate_pagination(5, 10),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
    }
}
