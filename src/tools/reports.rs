//! Report generation tools
//!
//! Weekly PDF intake report: renal-critical mineral trends against the
//! restriction bounds, plus day-by-day totals.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use printpdf::*;
use printpdf::image_crate::{DynamicImage, ImageFormat, RgbImage};
use serde::Serialize;

use crate::db::Database;
use crate::models::{DailyIntake, FoodLogEntry, NutrientCode, Person};
use crate::nutrition::restrictions::{resolve_bounds, NutrientBound};

use super::restrictions::load_bounds_by_name;

/// Restriction whose bounds the report draws
const REPORT_REFERENCE_RESTRICTION: &str = "renal-safe";

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

const COLOR_TITLE: (u8, u8, u8) = (0, 112, 192);       // Blue for report title
const COLOR_OK: (u8, u8, u8) = (0, 176, 80);           // Green
const COLOR_OVER: (u8, u8, u8) = (255, 0, 0);          // Red
const COLOR_SODIUM: (u8, u8, u8) = (255, 0, 0);        // Red series
const COLOR_POTASSIUM: (u8, u8, u8) = (0, 0, 255);     // Blue series
const COLOR_PHOSPHORUS: (u8, u8, u8) = (112, 48, 160); // Purple series
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_GRAY: (u8, u8, u8) = (128, 128, 128);

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub file_path: String,
    pub total_entries: i64,
    pub days_logged: i64,
    pub date_range: String,
    pub message: String,
}

/// The three bounds the chart and table highlight
#[derive(Debug, Clone, Copy, Default)]
struct MineralLimits {
    sodium_max: Option<f64>,
    potassium_max: Option<f64>,
    phosphorus_max: Option<f64>,
}

impl MineralLimits {
    fn from_bounds(bounds: &[NutrientBound]) -> Self {
        let max_for = |code: NutrientCode| {
            bounds.iter().find(|b| b.code == code).and_then(|b| b.max)
        };
        Self {
            sodium_max: max_for(NutrientCode::Sodium),
            potassium_max: max_for(NutrientCode::Potassium),
            phosphorus_max: max_for(NutrientCode::Phosphorus),
        }
    }
}

/// Classify a daily value against its limit
fn classify_against_limit(value: f64, limit: Option<f64>) -> (&'static str, (u8, u8, u8)) {
    match limit {
        Some(limit) if value > limit => ("Over limit", COLOR_OVER),
        Some(_) => ("Within limit", COLOR_OK),
        None => ("No limit set", COLOR_GRAY),
    }
}

fn day_of_week_abbrev(date: &NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

// ============================================================================
// Chart Generation (plotters)
// ============================================================================

/// Generate the mineral trend chart as PNG bytes
fn generate_intake_chart(
    days: &[DailyIntake],
    limits: &MineralLimits,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if days.is_empty() {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        // Y axis spans observed values and every configured limit
        let observed_max = days
            .iter()
            .flat_map(|d| vec![d.sodium, d.potassium, d.phosphorus])
            .fold(f64::NEG_INFINITY, f64::max);
        let limit_max = [limits.sodium_max, limits.potassium_max, limits.phosphorus_max]
            .into_iter()
            .flatten()
            .fold(0.0, f64::max);
        let y_max = observed_max.max(limit_max).max(100.0) * 1.1;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0..(days.len() as i32), 0.0..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(days.len().min(10))
            .x_label_formatter(&|x| {
                if *x >= 0 && (*x as usize) < days.len() {
                    let date = &days[*x as usize].date;
                    date.split('-').skip(1).collect::<Vec<_>>().join("/")
                } else {
                    String::new()
                }
            })
            .y_desc("mg / day")
            .draw()
            .map_err(|e| e.to_string())?;

        // Reference lines at the configured limits
        let reference_lines = [
            (limits.sodium_max, COLOR_SODIUM),
            (limits.potassium_max, COLOR_POTASSIUM),
            (limits.phosphorus_max, COLOR_PHOSPHORUS),
        ];
        for (limit, (r, g, b)) in reference_lines {
            if let Some(limit) = limit {
                chart
                    .draw_series(std::iter::once(PathElement::new(
                        vec![(0, limit), (days.len() as i32, limit)],
                        ShapeStyle::from(&RGBColor(r, g, b).mix(0.4)).stroke_width(1),
                    )))
                    .map_err(|e| e.to_string())?;
            }
        }

        // One series per mineral
        let series: [(&str, (u8, u8, u8), Box<dyn Fn(&DailyIntake) -> f64>); 3] = [
            ("Sodium", COLOR_SODIUM, Box::new(|d: &DailyIntake| d.sodium)),
            ("Potassium", COLOR_POTASSIUM, Box::new(|d: &DailyIntake| d.potassium)),
            ("Phosphorus", COLOR_PHOSPHORUS, Box::new(|d: &DailyIntake| d.phosphorus)),
        ];

        for (label, (r, g, b), value) in &series {
            let color = RGBColor(*r, *g, *b);
            let points: Vec<(i32, f64)> = days
                .iter()
                .enumerate()
                .map(|(i, d)| (i as i32, value(d)))
                .collect();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .map_err(|e| e.to_string())?
                .label(*label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });

            chart
                .draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), 3, color.filled())))
                .map_err(|e| e.to_string())?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    // Convert RGB buffer to PNG
    let img = RgbImage::from_raw(width, height, buffer)
        .ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    let dyn_img = DynamicImage::ImageRgb8(img);
    dyn_img
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}

// ============================================================================
// PDF Generation Helper Functions
// ============================================================================

fn rgb_to_printpdf(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn add_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    x: Mm,
    y: Mm,
    size: f32,
    color: (u8, u8, u8),
) {
    layer.set_fill_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.use_text(text, size, x, y, font);
}

fn add_line(
    layer: &PdfLayerReference,
    x1: Mm,
    y1: Mm,
    x2: Mm,
    y2: Mm,
    color: (u8, u8, u8),
    width: f32,
) {
    layer.set_outline_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.set_outline_thickness(width);

    let line = Line {
        points: vec![
            (Point::new(x1, y1), false),
            (Point::new(x2, y2), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

// ============================================================================
// Intake Report Generation
// ============================================================================

/// Generate a weekly intake PDF report for a person
pub fn generate_intake_report(
    db: &Database,
    person_id: i64,
    start_date: &str,
    end_date: &str,
    output_path: &str,
    notes: Option<Vec<String>>,
) -> Result<GenerateReportResponse, String> {
    let conn = db.get_conn().map_err(|e| e.to_string())?;

    let person = Person::get_by_id(&conn, person_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Person not found with id: {}", person_id))?;

    let days = FoodLogEntry::daily_intake(&conn, person_id, start_date, end_date)
        .map_err(|e| e.to_string())?;
    drop(conn);

    if days.is_empty() {
        return Err(format!(
            "No food log entries found between {} and {}",
            start_date, end_date
        ));
    }

    let limits = load_bounds_by_name(db, REPORT_REFERENCE_RESTRICTION)?
        .map(|rows| MineralLimits::from_bounds(&resolve_bounds(&rows)))
        .unwrap_or_default();

    let total_entries: i64 = days.iter().map(|d| d.entry_count).sum();
    let days_logged = days.len() as i64;

    // Overall averages
    let n = days.len() as f64;
    let avg_energy = days.iter().map(|d| d.energy).sum::<f64>() / n;
    let avg_protein = days.iter().map(|d| d.protein).sum::<f64>() / n;
    let avg_sodium = days.iter().map(|d| d.sodium).sum::<f64>() / n;
    let avg_potassium = days.iter().map(|d| d.potassium).sum::<f64>() / n;
    let avg_phosphorus = days.iter().map(|d| d.phosphorus).sum::<f64>() / n;

    let over_days = |limit: Option<f64>, value: fn(&DailyIntake) -> f64| -> i64 {
        match limit {
            Some(limit) => days.iter().filter(|d| value(d) > limit).count() as i64,
            None => 0,
        }
    };
    let sodium_over = over_days(limits.sodium_max, |d| d.sodium);
    let potassium_over = over_days(limits.potassium_max, |d| d.potassium);
    let phosphorus_over = over_days(limits.phosphorus_max, |d| d.phosphorus);

    // Create PDF - Page 1 Portrait
    let (doc, page1, layer1) = PdfDocument::new(
        "Renal Intake Report",
        Mm(215.9),  // Letter width
        Mm(279.4),  // Letter height
        "Layer 1",
    );

    let font = doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| e.to_string())?;
    let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| e.to_string())?;

    let layer = doc.get_page(page1).get_layer(layer1);

    // Page 1 dimensions (Portrait)
    let page_height = 279.4;
    let margin_left = 15.0;
    let mut y = page_height - 20.0;

    // Title
    add_text(&layer, &font_bold, "Renal Intake Report", Mm(margin_left), Mm(y), 18.0, COLOR_TITLE);
    y -= 10.0;

    // Patient info
    let patient_name = format!("{} {}", person.first_name, person.last_name);
    add_text(&layer, &font, &format!("Patient: {}", patient_name), Mm(margin_left), Mm(y), 11.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("DOB: {}", person.birth_date), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
    y -= 6.0;

    add_text(&layer, &font, &format!("Report Period: {} to {}", start_date, end_date), Mm(margin_left), Mm(y), 11.0, COLOR_BLACK);
    let now = chrono::Local::now().format("%Y-%m-%d").to_string();
    add_text(&layer, &font, &format!("Generated: {}", now), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
    y -= 10.0;

    // Horizontal line
    add_line(&layer, Mm(margin_left), Mm(y), Mm(200.0), Mm(y), COLOR_GRAY, 0.5);
    y -= 8.0;

    // Summary section
    add_text(&layer, &font_bold, "Summary", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;

    add_text(&layer, &font, &format!("Entries Logged: {}", total_entries), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("Days With Data: {}", days_logged), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 6.0;

    add_text(&layer, &font, &format!("Avg Energy: {:.0} kcal/day", avg_energy), Mm(margin_left), Mm(y), 10.0, COLOR_BLACK);
    add_text(&layer, &font, &format!("Avg Protein: {:.1} g/day", avg_protein), Mm(80.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 6.0;

    let (sodium_class, sodium_color) = classify_against_limit(avg_sodium, limits.sodium_max);
    add_text(&layer, &font, &format!("Avg Sodium: {:.0} mg/day ({})", avg_sodium, sodium_class), Mm(margin_left), Mm(y), 10.0, sodium_color);
    add_text(&layer, &font, &format!("Days over sodium limit: {}", sodium_over), Mm(110.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 6.0;

    let (potassium_class, potassium_color) = classify_against_limit(avg_potassium, limits.potassium_max);
    add_text(&layer, &font, &format!("Avg Potassium: {:.0} mg/day ({})", avg_potassium, potassium_class), Mm(margin_left), Mm(y), 10.0, potassium_color);
    add_text(&layer, &font, &format!("Days over potassium limit: {}", potassium_over), Mm(110.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 6.0;

    let (phosphorus_class, phosphorus_color) = classify_against_limit(avg_phosphorus, limits.phosphorus_max);
    add_text(&layer, &font, &format!("Avg Phosphorus: {:.0} mg/day ({})", avg_phosphorus, phosphorus_class), Mm(margin_left), Mm(y), 10.0, phosphorus_color);
    add_text(&layer, &font, &format!("Days over phosphorus limit: {}", phosphorus_over), Mm(110.0), Mm(y), 10.0, COLOR_BLACK);
    y -= 12.0;

    // Daily table
    add_text(&layer, &font_bold, "Daily Intake", Mm(margin_left), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;

    let col_widths = [22.0, 14.0, 10.0, 24.0, 24.0, 26.0, 28.0, 28.0];
    let headers = ["Date", "Day", "N", "Energy", "Protein", "Sodium", "Potassium", "Phosphorus"];

    let mut col_x = margin_left;
    for (i, header) in headers.iter().enumerate() {
        add_text(&layer, &font_bold, header, Mm(col_x), Mm(y), 8.0, COLOR_BLACK);
        col_x += col_widths[i];
    }
    y -= 5.0;

    for day in days.iter() {
        col_x = margin_left;

        let parsed = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d").ok();
        let weekday = parsed.map(|d| day_of_week_abbrev(&d)).unwrap_or("---");

        let (_, sodium_color) = classify_against_limit(day.sodium, limits.sodium_max);
        let (_, potassium_color) = classify_against_limit(day.potassium, limits.potassium_max);
        let (_, phosphorus_color) = classify_against_limit(day.phosphorus, limits.phosphorus_max);

        let cells: [(String, (u8, u8, u8)); 8] = [
            (day.date.clone(), COLOR_BLACK),
            (weekday.to_string(), COLOR_BLACK),
            (day.entry_count.to_string(), COLOR_BLACK),
            (format!("{:.0}", day.energy), COLOR_BLACK),
            (format!("{:.1}", day.protein), COLOR_BLACK),
            (format!("{:.0}", day.sodium), sodium_color),
            (format!("{:.0}", day.potassium), potassium_color),
            (format!("{:.0}", day.phosphorus), phosphorus_color),
        ];

        for (i, (value, color)) in cells.iter().enumerate() {
            add_text(&layer, &font, value, Mm(col_x), Mm(y), 7.0, *color);
            col_x += col_widths[i];
        }
        y -= 4.5;
    }

    // ========================================================================
    // Page 2 - Landscape for Chart
    // ========================================================================
    let (page2, layer2) = doc.add_page(Mm(279.4), Mm(215.9), "Chart Page");  // Landscape
    let layer2 = doc.get_page(page2).get_layer(layer2);

    let landscape_height = 215.9;
    let margin_left_p2 = 15.0;
    let mut y2 = landscape_height - 20.0;

    // Chart title
    add_text(&layer2, &font_bold, "Mineral Intake Trend", Mm(margin_left_p2), Mm(y2), 16.0, COLOR_TITLE);
    add_text(&layer2, &font, &format!("{} - {}", start_date, end_date), Mm(120.0), Mm(y2), 11.0, COLOR_BLACK);
    y2 -= 10.0;

    // Generate and embed chart (larger for landscape)
    match generate_intake_chart(&days, &limits, 1000, 400) {
        Ok(png_bytes) => {
            let dynamic_image = printpdf::image_crate::load_from_memory(&png_bytes)
                .map_err(|e| e.to_string())?;
            let pdf_image = Image::from_dynamic_image(&dynamic_image);

            // 1000x400 pixels at 120 DPI = ~212mm x 85mm - fits well on landscape
            let transform = ImageTransform {
                translate_x: Some(Mm(margin_left_p2)),
                translate_y: Some(Mm(y2 - 90.0)),
                dpi: Some(120.0),
                ..Default::default()
            };

            pdf_image.add_to_layer(layer2.clone(), transform);
            y2 -= 95.0;
        }
        Err(e) => {
            add_text(&layer2, &font, &format!("Chart generation error: {}", e), Mm(margin_left_p2), Mm(y2 - 10.0), 9.0, COLOR_OVER);
            y2 -= 15.0;
        }
    }

    // Legend: the configured limits
    y2 -= 5.0;
    add_text(&layer2, &font_bold, "Limits:", Mm(margin_left_p2), Mm(y2), 10.0, COLOR_BLACK);
    let mut legend_x = 45.0;
    let legend_entries = [
        ("Sodium", limits.sodium_max, COLOR_SODIUM),
        ("Potassium", limits.potassium_max, COLOR_POTASSIUM),
        ("Phosphorus", limits.phosphorus_max, COLOR_PHOSPHORUS),
    ];
    for (label, limit, color) in legend_entries {
        let text = match limit {
            Some(limit) => format!("{} <= {:.0} mg", label, limit),
            None => format!("{}: no limit", label),
        };
        add_text(&layer2, &font, &text, Mm(legend_x), Mm(y2), 10.0, color);
        legend_x += 65.0;
    }
    y2 -= 10.0;

    // Clinical notes on page 2
    if let Some(ref notes_list) = notes {
        if !notes_list.is_empty() {
            add_text(&layer2, &font_bold, "Notes", Mm(margin_left_p2), Mm(y2), 12.0, COLOR_BLACK);
            y2 -= 6.0;

            for note in notes_list {
                add_text(&layer2, &font, &format!("- {}", note), Mm(margin_left_p2), Mm(y2), 9.0, COLOR_BLACK);
                y2 -= 5.0;
            }
        }
    }

    // Save PDF
    let path = Path::new(output_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    let file = File::create(path).map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer).map_err(|e| e.to_string())?;

    Ok(GenerateReportResponse {
        success: true,
        file_path: output_path.to_string(),
        total_entries,
        days_logged,
        date_range: format!("{} to {}", start_date, end_date),
        message: format!(
            "Intake report generated with {} entries over {} days",
            total_entries, days_logged
        ),
    })
}
