//! Property surface for the system power supply nodes
//!
//! The platform sees five logical supplies: the battery itself plus one
//! node per source family. Everything is answered from the last
//! published [`BatterySnapshot`], so queries never touch hardware and
//! never block the monitor loop.

use super::battery::{BatteryHealth, BatterySnapshot, ChargeStatus, ChargeType};
use crate::cable::CableType;
use crate::monitor::ThermalZone;
use crate::tx::AovState;

/// Logical power supply node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PsyClass {
    Battery,
    /// Mains class wired sources (TA, HV, PD)
    Ac,
    /// USB enumeration class wired sources
    Usb,
    Wireless,
    Otg,
}

/// Property selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Property {
    Status,
    ChargeType,
    Health,
    Online,
    Present,
    VoltageNow,
    VoltageAvg,
    CurrentNow,
    CurrentAvg,
    Soc,
    Temperature,
    ThermalZone,
    CycleCount,
    TimeToFull,
    MaxChargePower,
    CurrentEvents,
    MiscEvents,
    TxEvents,
    TxState,
}

/// Typed property value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PropertyValue {
    Status(ChargeStatus),
    ChargeType(ChargeType),
    Health(BatteryHealth),
    Bool(bool),
    Millivolts(i32),
    Milliamps(i32),
    Percent(u8),
    TenthsCelsius(i32),
    Zone(ThermalZone),
    Count(u16),
    Seconds(u32),
    Milliwatts(i32),
    Bits(u16),
    TxState(AovState),
}

/// Which source node carries the given cable
fn source_class(cable: CableType) -> Option<PsyClass> {
    match cable {
        CableType::None => None,
        CableType::Usb | CableType::UsbCdp => Some(PsyClass::Usb),
        CableType::Otg => Some(PsyClass::Otg),
        _ if cable.is_wireless() => Some(PsyClass::Wireless),
        _ => Some(PsyClass::Ac),
    }
}

/// Answers one property query.
///
/// Returns `None` for combinations the node does not expose, which the
/// caller reports as unsupported rather than inventing a zero.
pub fn query(
    snapshot: &BatterySnapshot,
    class: PsyClass,
    property: Property,
) -> Option<PropertyValue> {
    match class {
        PsyClass::Battery => query_battery(snapshot, property),
        _ => query_source(snapshot, class, property),
    }
}

fn query_battery(snapshot: &BatterySnapshot, property: Property) -> Option<PropertyValue> {
    let value = match property {
        Property::Status => PropertyValue::Status(snapshot.status),
        Property::ChargeType => PropertyValue::ChargeType(snapshot.charge_type),
        Property::Health => PropertyValue::Health(snapshot.health),
        Property::Online => PropertyValue::Bool(snapshot.cable.is_charging_source()),
        Property::Present => PropertyValue::Bool(snapshot.battery_present),
        Property::VoltageNow => PropertyValue::Millivolts(snapshot.voltage_mv),
        Property::VoltageAvg => PropertyValue::Millivolts(snapshot.avg_voltage_mv),
        Property::CurrentNow => PropertyValue::Milliamps(snapshot.current_ma),
        Property::CurrentAvg => PropertyValue::Milliamps(snapshot.avg_current_ma),
        Property::Soc => PropertyValue::Percent(snapshot.soc),
        Property::Temperature => PropertyValue::TenthsCelsius(snapshot.temperature),
        Property::ThermalZone => PropertyValue::Zone(snapshot.thermal_zone),
        Property::CycleCount => PropertyValue::Count(snapshot.cycle_count),
        Property::TimeToFull => PropertyValue::Seconds(snapshot.time_to_full_s?),
        Property::MaxChargePower => PropertyValue::Milliwatts(snapshot.max_charge_power_mw),
        Property::CurrentEvents => PropertyValue::Bits(snapshot.current_events.bits()),
        Property::MiscEvents => PropertyValue::Bits(snapshot.misc_events.bits()),
        // the wireless node owns the transmit-path properties
        Property::TxEvents | Property::TxState => return None,
    };
    Some(value)
}

fn query_source(
    snapshot: &BatterySnapshot,
    class: PsyClass,
    property: Property,
) -> Option<PropertyValue> {
    let online = source_class(snapshot.cable) == Some(class);
    match property {
        Property::Online | Property::Present => Some(PropertyValue::Bool(online)),
        Property::MaxChargePower if online => {
            Some(PropertyValue::Milliwatts(snapshot.max_charge_power_mw))
        }
        // transmit state is independent of what powers the device
        Property::TxEvents if class == PsyClass::Wireless => {
            Some(PropertyValue::Bits(snapshot.tx_events.bits()))
        }
        Property::TxState if class == PsyClass::Wireless => {
            Some(PropertyValue::TxState(snapshot.aov_state))
        }
        _ => None,
    }
}
