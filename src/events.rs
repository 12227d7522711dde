//! User interactions as typed events.
//!
//! Each line typed into the session is one control interaction. Parsing
//! is kept separate from handling so the controller never sees raw text.

use crate::model::{MapSelection, Severity, SsidFilter};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SelectMap(MapSelection),
    SetDates {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    SetSsid(SsidFilter),
    SearchDevice(String),
    ClearDevice,
    ToggleLayer {
        layer: Severity,
        visible: bool,
    },
    ResetFilters,
    ResetMap,
    /// Chart bar, by position in the rendered ranking
    BarClicked(usize),
    InspectZone {
        layer: Severity,
        index: usize,
    },
    CopyId(String),
    Export,
    Refresh,
    Help,
    Quit,
}

/// Work the session must carry out after an event was handled
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Reconcile,
    Copy(String),
    Export,
    ShowHelp,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for the list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid date '{0}', expected YYYY-MM-DD or '-'")]
    Date(String),
    #[error("{0}")]
    Value(String),
}

pub const HELP: &str = "\
Comandos:
  map <patio|tmut>              seleciona o mapa
  dates <início|-> <fim|->      define o período (YYYY-MM-DD, '-' limpa)
  ssid <all|main_network|disconnected|other_networks>
  device <id>                   filtra por tablet
  clear-device                  remove o filtro de tablet
  layer <good|attention|critical> <on|off>
  reset                         volta o período para ontem
  reset-map                     recentraliza o mapa
  focus <n>                     centraliza no n-ésimo local do ranking
  zone <good|attention|critical> <n>   detalhes de uma zona
  copy <id>                     copia um ID de medição
  export                        baixa a planilha Excel
  refresh                       recarrega os dados
  quit";

fn parse_date(arg: &str) -> Result<Option<NaiveDate>, CommandError> {
    if arg == "-" {
        return Ok(None);
    }
    NaiveDate::parse_from_str(arg, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| CommandError::Date(arg.to_string()))
}

fn parse_index(arg: &str, usage: &'static str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::Usage(usage)),
    }
}

pub fn parse_command(line: &str) -> Result<UiEvent, CommandError> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or(CommandError::Empty)?.to_lowercase();
    let args: Vec<&str> = words.collect();

    let event = match (command.as_str(), args.as_slice()) {
        ("map", [name]) => UiEvent::SelectMap(name.parse().map_err(CommandError::Value)?),
        ("map", _) => return Err(CommandError::Usage("map <patio|tmut>")),
        ("dates", [start, end]) => UiEvent::SetDates {
            start: parse_date(start)?,
            end: parse_date(end)?,
        },
        ("dates", _) => return Err(CommandError::Usage("dates <início|-> <fim|->")),
        ("ssid", [value]) => UiEvent::SetSsid(value.parse().map_err(CommandError::Value)?),
        ("ssid", _) => {
            return Err(CommandError::Usage(
                "ssid <all|main_network|disconnected|other_networks>",
            ))
        }
        ("device", [_, ..]) => UiEvent::SearchDevice(args.join(" ")),
        ("device", []) => return Err(CommandError::Usage("device <id>")),
        ("clear-device", []) => UiEvent::ClearDevice,
        ("layer", [layer, state]) => {
            let visible = match state.to_lowercase().as_str() {
                "on" => true,
                "off" => false,
                _ => return Err(CommandError::Usage("layer <good|attention|critical> <on|off>")),
            };
            UiEvent::ToggleLayer {
                layer: layer.parse().map_err(CommandError::Value)?,
                visible,
            }
        }
        ("layer", _) => return Err(CommandError::Usage("layer <good|attention|critical> <on|off>")),
        ("reset", []) => UiEvent::ResetFilters,
        ("reset-map", []) => UiEvent::ResetMap,
        ("focus", [n]) => UiEvent::BarClicked(parse_index(n, "focus <n>")?),
        ("focus", _) => return Err(CommandError::Usage("focus <n>")),
        ("zone", [layer, n]) => UiEvent::InspectZone {
            layer: layer.parse().map_err(CommandError::Value)?,
            index: parse_index(n, "zone <good|attention|critical> <n>")?,
        },
        ("zone", _) => return Err(CommandError::Usage("zone <good|attention|critical> <n>")),
        ("copy", [id]) => UiEvent::CopyId(id.to_string()),
        ("copy", _) => return Err(CommandError::Usage("copy <id>")),
        ("export", []) => UiEvent::Export,
        ("refresh", []) => UiEvent::Refresh,
        ("help", _) | ("?", _) => UiEvent::Help,
        ("quit", _) | ("exit", _) => UiEvent::Quit,
        _ => return Err(CommandError::Unknown(command)),
    };
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_pairs_and_blanks() {
        assert_eq!(
            parse_command("dates 2024-03-10 2024-03-09"),
            Ok(UiEvent::SetDates {
                start: NaiveDate::from_ymd_opt(2024, 3, 10),
                end: NaiveDate::from_ymd_opt(2024, 3, 9),
            })
        );
        assert_eq!(
            parse_command("dates - -"),
            Ok(UiEvent::SetDates { start: None, end: None })
        );
        assert_eq!(
            parse_command("dates 10/03/2024 -"),
            Err(CommandError::Date("10/03/2024".to_string()))
        );
    }

    #[test]
    fn device_keeps_inner_spaces() {
        assert_eq!(
            parse_command("device TAB 042"),
            Ok(UiEvent::SearchDevice("TAB 042".to_string()))
        );
    }

    #[test]
    fn layer_toggles() {
        assert_eq!(
            parse_command("layer attention off"),
            Ok(UiEvent::ToggleLayer {
                layer: Severity::Attention,
                visible: false
            })
        );
        assert!(matches!(
            parse_command("layer attention maybe"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(parse_command("focus 1"), Ok(UiEvent::BarClicked(0)));
        assert!(parse_command("focus 0").is_err());
        assert_eq!(
            parse_command("zone critical 3"),
            Ok(UiEvent::InspectZone {
                layer: Severity::Critical,
                index: 2
            })
        );
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert_eq!(
            parse_command("zoom 3"),
            Err(CommandError::Unknown("zoom".to_string()))
        );
        assert!(matches!(parse_command("map lobby"), Err(CommandError::Value(_))));
    }
}
