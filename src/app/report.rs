use crate::config::OutputFormat;
use crate::domain::model::{
    CountryLabel, GlobalRanking, PointEstimate, PredictionResult, TrendSeries, VocabularySource,
};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct CountryList {
    pub source: VocabularySource,
    pub countries: Vec<CountryLabel>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Countries(CountryList),
    Point(PointEstimate),
    Ranking(GlobalRanking),
    Trend(TrendSeries),
}

#[derive(Serialize)]
struct RankingRow<'a> {
    list: &'a str,
    rank: usize,
    country: &'a str,
    price_usd: f64,
}

#[derive(Serialize)]
struct TrendRow<'a> {
    year: i32,
    country: &'a str,
    country_price_usd: f64,
    benchmark_country: &'a str,
    benchmark_price_usd: f64,
}

#[derive(Serialize)]
struct CountryRow<'a> {
    country: &'a str,
    source: VocabularySource,
}

pub fn render<W: Write>(out: W, format: OutputFormat, report: &Report) -> Result<()> {
    match format {
        OutputFormat::Json => render_json(out, report),
        OutputFormat::Csv => render_csv(out, report),
        OutputFormat::Text => render_text(out, report),
    }
}

fn render_json<W: Write>(mut out: W, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}

fn render_csv<W: Write>(out: W, report: &Report) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    match report {
        Report::Countries(list) => {
            for country in &list.countries {
                writer.serialize(CountryRow {
                    country: country.as_str(),
                    source: list.source,
                })?;
            }
        }
        Report::Point(estimate) => writer.serialize(estimate)?,
        Report::Ranking(ranking) => {
            for (list, results) in [
                ("most_expensive", &ranking.most_expensive),
                ("cheapest", &ranking.cheapest),
            ] {
                for (index, result) in results.iter().enumerate() {
                    writer.serialize(RankingRow {
                        list,
                        rank: index + 1,
                        country: result.query.country.as_str(),
                        price_usd: result.price,
                    })?;
                }
            }
        }
        Report::Trend(trend) => {
            for (c, b) in trend.country_series.iter().zip(&trend.benchmark_series) {
                writer.serialize(TrendRow {
                    year: c.query.year,
                    country: c.query.country.as_str(),
                    country_price_usd: c.price,
                    benchmark_country: b.query.country.as_str(),
                    benchmark_price_usd: b.price,
                })?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn usd(price: f64) -> String {
    format!("US$ {:.2}", price)
}

fn write_table<W: Write>(out: &mut W, title: &str, results: &[PredictionResult]) -> Result<()> {
    writeln!(out, "{}", title)?;
    for (index, result) in results.iter().enumerate() {
        writeln!(
            out,
            "  {:>2}. {:<20} {}",
            index + 1,
            result.query.country,
            usd(result.price)
        )?;
    }
    Ok(())
}

fn render_text<W: Write>(mut out: W, report: &Report) -> Result<()> {
    match report {
        Report::Countries(list) => {
            if list.source == VocabularySource::Fallback {
                writeln!(out, "(fallback country list: vocabulary not found in the artifact)")?;
            }
            for country in &list.countries {
                writeln!(out, "{}", country)?;
            }
        }
        Report::Point(e) => {
            writeln!(
                out,
                "Price in {} ({:02}/{}): {} ({:+.1}% vs {})",
                e.country,
                e.month,
                e.year,
                usd(e.country_price),
                e.relative_delta_percent,
                e.benchmark_country
            )?;
            writeln!(out, "Price in {} (benchmark): {}", e.benchmark_country, usd(e.benchmark_price))?;
            writeln!(
                out,
                "Converted: {:.2} (fixed rate: US$ 1 = {:.2})",
                e.converted_price, e.exchange_rate
            )?;
        }
        Report::Ranking(r) => {
            writeln!(out, "Estimated ranking for {:02}/{}", r.month, r.year)?;
            write_table(&mut out, &format!("Top {} most expensive", r.most_expensive.len()), &r.most_expensive)?;
            write_table(&mut out, &format!("Top {} cheapest", r.cheapest.len()), &r.cheapest)?;
        }
        Report::Trend(t) => {
            writeln!(out, "{:>6}  {:>14}  {:>14}", "year", t.country.as_str(), t.benchmark_country.as_str())?;
            for (c, b) in t.country_series.iter().zip(&t.benchmark_series) {
                let marker = if c.query.year == t.marker_year { " <" } else { "" };
                writeln!(
                    out,
                    "{:>6}  {:>14}  {:>14}{}",
                    c.query.year,
                    usd(c.price),
                    usd(b.price),
                    marker
                )?;
            }
        }
    }
    Ok(())
}
