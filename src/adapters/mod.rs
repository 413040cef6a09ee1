//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `hardware`     | SensorPort         | ISR handoff cells, float pin |
//! |                | TemperaturePort    | thermistor ADC               |
//! |                | ActuatorPort       | IR emitter enable pins       |
//! | `log_sink`     | EventSink          | `log` facade                 |
//! | `nvs`          | ConfigPort         | in-memory NV store           |
//! |                | StoragePort        |                              |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
