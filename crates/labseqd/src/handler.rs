//! Command handler for RESP server

use crate::dto::{CacheStatsResponse, ErrorResponse, LabSeqResponse, MessageResponse};
use crate::resp::RespValue;
use labseq::SequenceCache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct CommandHandler {
    cache: Arc<SequenceCache>,
}

impl CommandHandler {
    pub fn new(cache: Arc<SequenceCache>) -> Self {
        Self { cache }
    }

    pub fn handle(&self, cmd: RespValue) -> RespValue {
        let arr = match cmd {
            RespValue::Array(Some(arr)) if !arr.is_empty() => arr,
            _ => return RespValue::Error("ERR invalid command format".to_string()),
        };

        let command = match arr[0].as_text() {
            Some(cmd) => cmd.to_uppercase(),
            None => return RespValue::Error("ERR invalid command".to_string()),
        };

        match command.as_str() {
            "PING" => self.handle_ping(&arr[1..]),
            "LABSEQ" => self.handle_labseq(&arr[1..]),
            "CACHE" => self.handle_cache(&arr[1..]),
            "INFO" => self.handle_info(),
            "COMMAND" => RespValue::Array(Some(vec![])),
            _ => RespValue::Error(format!("ERR unknown command '{}'", command)),
        }
    }

    fn handle_ping(&self, args: &[RespValue]) -> RespValue {
        match args {
            [] => RespValue::SimpleString("PONG".to_string()),
            [msg] => msg.clone(),
            _ => wrong_arity("ping"),
        }
    }

    fn handle_labseq(&self, args: &[RespValue]) -> RespValue {
        let [arg] = args else {
            return wrong_arity("labseq");
        };

        let raw = arg.as_text().unwrap_or_default();
        let n: i64 = match raw.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                warn!("Invalid input for labseq: {:?}", raw);
                return error_reply(ErrorResponse::invalid_input(format!(
                    "Index must be an integer, got: {}",
                    raw
                )));
            }
        };

        info!("Received request to calculate l({})", n);
        let started = Instant::now();

        match self.cache.evaluate(n) {
            Ok(value) => {
                let calculation_time_ms = started.elapsed().as_millis() as u64;
                info!("Successfully calculated l({}) in {}ms", n, calculation_time_ms);
                json_reply(&LabSeqResponse {
                    index: n,
                    value: value.to_string(),
                    calculation_time_ms,
                    cache_size: self.cache.size(),
                })
            }
            Err(e) if e.is_client_error() => {
                warn!("Invalid input for n={}: {}", n, e);
                error_reply(ErrorResponse::invalid_input(e.to_string()))
            }
            Err(e) => {
                error!("Error calculating l({}): {}", n, e);
                error_reply(ErrorResponse::calculation_error(e))
            }
        }
    }

    fn handle_cache(&self, args: &[RespValue]) -> RespValue {
        let sub = match args {
            [sub] => sub.as_text().unwrap_or_default().to_uppercase(),
            _ => return wrong_arity("cache"),
        };

        match sub.as_str() {
            "STATS" => {
                debug!("Cache stats requested");
                json_reply(&CacheStatsResponse {
                    cache_size: self.cache.size(),
                })
            }
            "CLEAR" => {
                info!("Cache clear requested");
                let cache_size = self.cache.reset();
                json_reply(&MessageResponse {
                    message: "Cache cleared successfully".to_string(),
                    cache_size,
                })
            }
            _ => RespValue::Error(format!("ERR unknown cache subcommand '{}'", sub)),
        }
    }

    fn handle_info(&self) -> RespValue {
        let stats = self.cache.stats().snapshot();
        let info = format!(
            "# Server\r\n\
             labseq_version:{}\r\n\
             \r\n\
             # Cache\r\n\
             cache_size:{}\r\n\
             cache_watermark:{}\r\n\
             cache_capacity:{}\r\n\
             cache_hits:{}\r\n\
             cache_misses:{}\r\n\
             cache_inserts:{}\r\n\
             cache_resets:{}\r\n\
             cache_hit_ratio:{:.2}\r\n",
            env!("CARGO_PKG_VERSION"),
            self.cache.size(),
            self.cache.watermark(),
            self.cache.capacity(),
            stats.hits,
            stats.misses,
            stats.inserts,
            stats.resets,
            stats.hit_ratio(),
        );
        RespValue::bulk(info)
    }
}

fn wrong_arity(command: &str) -> RespValue {
    RespValue::Error(format!(
        "ERR wrong number of arguments for '{}' command",
        command
    ))
}

fn json_reply<T: Serialize>(body: &T) -> RespValue {
    match serde_json::to_string(body) {
        Ok(json) => RespValue::bulk(json),
        Err(e) => RespValue::Error(format!("ERR {}", e)),
    }
}

fn error_reply(body: ErrorResponse) -> RespValue {
    match serde_json::to_string(&body) {
        Ok(json) => RespValue::Error(format!("ERR {}", json)),
        Err(_) => RespValue::Error(format!("ERR {}", body.message)),
    }
}
