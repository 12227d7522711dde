use crate::model::{DateRange, KpiSummary, SsidFilter, ViewState};
use chrono::NaiveDate;

pub const ALL_DATA: &str = "Exibindo: Todos os dados disponíveis";
pub const INVALID_DATES: &str = "Erro: Datas inválidas.";
pub const LOAD_FAILED: &str = "Erro ao carregar dados. Tente novamente.";
pub const ALL_DEVICES: &str = "Exibindo dados de todos os tablets";
pub const NO_CHART_DATA: &str = "Nenhum dado encontrado para os filtros selecionados.";
pub const COPY_OK: &str = "ID Copiado!";
pub const COPY_FAILED: &str = "Erro ao copiar";
pub const EXPORT_FAILED: &str = "Ocorreu um erro inesperado ao exportar os dados.";

/// Human-readable text shown around the map and chart
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusPanel {
    pub date_info: String,
    pub device_info: String,
    pub chart_title: String,
    pub chart_style: &'static str,
    pub kpis: Option<KpiSummary>,
    pub loading: bool,
}

impl StatusPanel {
    /// KPI card lines, or placeholders before the first successful cycle
    pub fn kpi_lines(&self) -> Vec<String> {
        match self.kpis {
            Some(ref kpis) => kpi_lines(kpis),
            None => vec!["Total de medições: --".to_string()],
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.loading {
            out.push_str("Carregando...\n");
        }
        out.push_str(&self.date_info);
        out.push('\n');
        out.push_str(&self.device_info);
        out.push('\n');
        for line in self.kpi_lines() {
            out.push_str("  ");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

/// One-line summary of the active controls, used as the session prompt
pub fn describe_view(state: &ViewState) -> String {
    let layer = |on: bool| if on { "on" } else { "off" };
    let device = state.device_id.trim();
    format!(
        "[{} | {} | {} | tablet {} | boas {} atenção {} críticas {}]",
        state.map,
        state.ssid,
        match state.dates.bounds() {
            Some((start, end)) => format!("{} → {}", start, end),
            None => "todas as datas".to_string(),
        },
        if device.is_empty() { "*" } else { device },
        layer(state.layers.good),
        layer(state.layers.attention),
        layer(state.layers.critical),
    )
}

fn day_month_year(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn date_status(range: &DateRange) -> String {
    match range.bounds() {
        Some((start, end)) => format!(
            "Exibindo dados de: {} a {}",
            day_month_year(start),
            day_month_year(end)
        ),
        None => ALL_DATA.to_string(),
    }
}

pub fn device_status(device_id: Option<&str>) -> String {
    match device_id {
        Some(id) => format!("Exibindo dados do tablet: {}", id),
        None => ALL_DEVICES.to_string(),
    }
}

/// Chart heading and its style class for the selected network category
pub fn chart_title(ssid: SsidFilter) -> (&'static str, &'static str) {
    match ssid {
        SsidFilter::MainNetwork => (
            "Top 10 Pontos Críticos - Rede Principal",
            "title-main-network",
        ),
        SsidFilter::Disconnected => (
            "Top 10 Pontos Críticos - Desconectados",
            "title-disconnected",
        ),
        SsidFilter::OtherNetworks => (
            "Top 10 Pontos Críticos - Outras Redes",
            "title-other-networks",
        ),
        SsidFilter::All => ("Top 10 Pontos Críticos - Todas as Medições", "title-all"),
    }
}

pub fn kpi_lines(kpis: &KpiSummary) -> Vec<String> {
    vec![
        format!("Total de medições: {}", kpis.total_measurements),
        format!("Medições críticas: {:.1}%", kpis.critical_percentage),
        format!("Desconexões: {}", kpis.disconnections),
        format!(
            "Pior tablet: {}",
            kpis.worst_tablet.as_deref().unwrap_or("N/A")
        ),
    ]
}
