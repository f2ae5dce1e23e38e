use std::{env, net::{SocketAddr, ToSocketAddrs as _}, str::FromStr};

use sea_orm::ConnectOptions;
use tracing::{info, warn};

use crate::{geofence::GeoPoint, settings::Defaults};

pub struct Config {
    pub host_address: SocketAddr,

    pub database_opt: ConnectOptions,

    pub jwt_key: String,

    /// Fallbacks used when the `setting` table has no value
    pub defaults: Defaults,
}

pub fn load() -> Config {
    Config {
        host_address: load_host_address(),
        database_opt: load_database_opt().into(),
        jwt_key: load_jwt_key(),
        defaults: load_defaults(),
    }
}

fn load_host_address() -> SocketAddr {
    info!("Loading environment `HOST_ADDRESS`");

    let var = env::var("HOST_ADDRESS").unwrap_or_else(|_| "127.0.0.1:0".to_string());

    var.to_socket_addrs()
        .expect("`HOST_ADDRESS` is not in a valid format").nth(0)
        .expect("unable to resolve host from `HOST_ADDRESS`")
}

fn load_database_opt() -> impl Into<ConnectOptions> {
    info!("Loading environment `DATABASE_URL`");

    env::var("DATABASE_URL").expect("Environment `DATABASE_URL` is required to be set")
}

fn load_jwt_key() -> String {
    info!("Loading environment `JWT_SECRET`");

    env::var("JWT_SECRET").expect("Environment `JWT_SECRET` is required to be set")
}

fn load_defaults() -> Defaults {
    let reference = match (load_optional::<f64>("GEOFENCE_LATITUDE"), load_optional::<f64>("GEOFENCE_LONGITUDE")) {
        (Some(latitude), Some(longitude)) => GeoPoint::new(latitude, longitude)
            .map_err(|err| warn!(error = %err, "Ignoring geofence reference point from environment"))
            .ok(),
        _ => None,
    };

    Defaults {
        reference,
        radius_m: load_optional("GEOFENCE_RADIUS_METERS"),
        child_payment_default: load_optional("CHILD_PAYMENT_DEFAULT"),
    }
}

/// Optional variables only fall back to their defaults; a malformed value is reported, not fatal
fn load_optional<T: FromStr>(name: &str) -> Option<T> {
    info!("Loading environment `{name}`");

    let var = env::var(name).ok()?;
    match var.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Environment `{name}` is not in a valid format, ignoring it");
            None
        }
    }
}
