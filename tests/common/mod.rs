#![allow(dead_code)]

use table_reconcile::PositionedFragment;

pub const LINE_X: f32 = 40.0;
pub const QTY_X: f32 = 80.0;
pub const PART_X: f32 = 130.0;
pub const DESCRIPTION_X: f32 = 230.0;
pub const PRICE_X: f32 = 450.0;

const FIRST_ROW_Y: f32 = 114.0;
const LEADING: f32 = 14.0;

/// One numbered line of a purchase order plus the wrapped lines printed
/// under its description.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub line: &'static str,
    pub qty: &'static str,
    pub part: &'static str,
    pub description: &'static str,
    pub price: &'static str,
    pub notes: Vec<&'static str>,
}

pub fn order_line(
    line: &'static str,
    qty: &'static str,
    part: &'static str,
    description: &'static str,
    price: &'static str,
) -> OrderLine {
    OrderLine {
        line,
        qty,
        part,
        description,
        price,
        notes: Vec::new(),
    }
}

impl OrderLine {
    pub fn note(mut self, note: &'static str) -> Self {
        self.notes.push(note);
        self
    }
}

pub fn fragment(x: f32, y: f32, text: &str, page: u32) -> PositionedFragment {
    let width = text.chars().count() as f32 * 5.0;
    PositionedFragment::new(x, y, width, text, page)
}

fn header_band(page: u32, fragments: &mut Vec<PositionedFragment>) {
    fragments.push(fragment(PRICE_X, 90.0, "Unit", page));
    for (x, title) in [
        (LINE_X, "Line"),
        (QTY_X, "Qty"),
        (PART_X, "Part"),
        (DESCRIPTION_X, "Description"),
        (PRICE_X, "Price"),
    ] {
        fragments.push(fragment(x, 100.0, title, page));
    }
}

/// Lays out a purchase order the way a PDF text extractor reports it:
/// letterhead on page one, a phone banner and page label on later pages,
/// the column header (with `Unit` wrapped above `Price`) repeated on every
/// page, and each order line followed by its note lines.
pub fn purchase_order(lines: &[OrderLine], lines_per_page: usize) -> Vec<Vec<PositionedFragment>> {
    lines
        .chunks(lines_per_page.max(1))
        .enumerate()
        .map(|(index, chunk)| {
            let page = u32::try_from(index + 1).expect("page number fits in u32");
            let mut fragments = Vec::new();
            if page == 1 {
                fragments.push(fragment(LINE_X, 40.0, "ACME Steel Supply", page));
                fragments.push(fragment(LINE_X, 54.0, "Purchase Order 4471", page));
            } else {
                fragments.push(fragment(LINE_X, 40.0, "ACME Steel Supply (555) 123-4567", page));
                fragments.push(fragment(LINE_X, 54.0, &format!("Page {page}"), page));
            }
            header_band(page, &mut fragments);

            let mut y = FIRST_ROW_Y;
            for order in chunk {
                for (x, text) in [
                    (LINE_X, order.line),
                    (QTY_X, order.qty),
                    (PART_X, order.part),
                    (DESCRIPTION_X, order.description),
                    (PRICE_X, order.price),
                ] {
                    fragments.push(fragment(x, y, text, page));
                }
                y += LEADING;
                for note in &order.notes {
                    fragments.push(fragment(DESCRIPTION_X, y, note, page));
                    y += LEADING;
                }
            }
            fragments
        })
        .collect()
}

/// Revision A of order 4471, spread over two pages.
pub fn revision_a() -> Vec<OrderLine> {
    vec![
        order_line("1", "4", "HB-12", "Hex bolt 1/2in", "2.50").note("Grade: A325"),
        order_line("2", "10", "W-12", "Flat washer", "0.15"),
        order_line("3", "2", "B-12", "W8x10 Beam", "310.00")
            .note("Mark: B12")
            .note("Finish: Galv"),
        order_line("4", "1", "PL-38", "Plate 3/8in", "45.00").note("Punch: P4"),
        order_line("5", "6", "A-2", "Angle 2x2", "12.00"),
    ]
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
