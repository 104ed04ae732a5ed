//! Biome taxonomy and the Holdridge-style classification table.
//!
//! Classification is a pure function of the temperature band (7 levels,
//! polar through tropical) and the humidity band (8 quantile levels,
//! superarid through superhumid). Ocean cells are always `Ocean`.

use serde::{Deserialize, Serialize};

/// Temperature classification bands, coldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureLevel {
    Polar,
    Alpine,
    Boreal,
    Cool,
    Warm,
    Subtropical,
    Tropical,
}

impl TemperatureLevel {
    pub const ALL: [TemperatureLevel; 7] = [
        TemperatureLevel::Polar,
        TemperatureLevel::Alpine,
        TemperatureLevel::Boreal,
        TemperatureLevel::Cool,
        TemperatureLevel::Warm,
        TemperatureLevel::Subtropical,
        TemperatureLevel::Tropical,
    ];
}

/// Humidity quantile bands, driest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HumidityLevel {
    Superarid,
    Perarid,
    Arid,
    Semiarid,
    Subhumid,
    Humid,
    Perhumid,
    Superhumid,
}

impl HumidityLevel {
    pub const ALL: [HumidityLevel; 8] = [
        HumidityLevel::Superarid,
        HumidityLevel::Perarid,
        HumidityLevel::Arid,
        HumidityLevel::Semiarid,
        HumidityLevel::Subhumid,
        HumidityLevel::Humid,
        HumidityLevel::Perhumid,
        HumidityLevel::Superhumid,
    ];
}

/// Every biome the classifier can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Ocean,
    PolarDesert,
    Ice,
    SubpolarDryTundra,
    SubpolarMoistTundra,
    SubpolarWetTundra,
    SubpolarRainTundra,
    BorealDesert,
    BorealDryScrub,
    BorealMoistForest,
    BorealWetForest,
    BorealRainForest,
    CoolTemperateDesert,
    CoolTemperateDesertScrub,
    CoolTemperateSteppe,
    CoolTemperateMoistForest,
    CoolTemperateWetForest,
    CoolTemperateRainForest,
    WarmTemperateDesert,
    WarmTemperateDesertScrub,
    WarmTemperateThornScrub,
    WarmTemperateDryForest,
    WarmTemperateMoistForest,
    WarmTemperateWetForest,
    WarmTemperateRainForest,
    SubtropicalDesert,
    SubtropicalDesertScrub,
    SubtropicalThornWoodland,
    SubtropicalDryForest,
    SubtropicalMoistForest,
    SubtropicalWetForest,
    SubtropicalRainForest,
    TropicalDesert,
    TropicalDesertScrub,
    TropicalThornWoodland,
    TropicalVeryDryForest,
    TropicalDryForest,
    TropicalMoistForest,
    TropicalWetForest,
    TropicalRainForest,
}

impl Biome {
    /// Display name matching the classic life-zone nomenclature.
    pub fn name(&self) -> &'static str {
        use Biome::*;
        match self {
            Ocean => "ocean",
            PolarDesert => "polar desert",
            Ice => "ice",
            SubpolarDryTundra => "subpolar dry tundra",
            SubpolarMoistTundra => "subpolar moist tundra",
            SubpolarWetTundra => "subpolar wet tundra",
            SubpolarRainTundra => "subpolar rain tundra",
            BorealDesert => "boreal desert",
            BorealDryScrub => "boreal dry scrub",
            BorealMoistForest => "boreal moist forest",
            BorealWetForest => "boreal wet forest",
            BorealRainForest => "boreal rain forest",
            CoolTemperateDesert => "cool temperate desert",
            CoolTemperateDesertScrub => "cool temperate desert scrub",
            CoolTemperateSteppe => "cool temperate steppe",
            CoolTemperateMoistForest => "cool temperate moist forest",
            CoolTemperateWetForest => "cool temperate wet forest",
            CoolTemperateRainForest => "cool temperate rain forest",
            WarmTemperateDesert => "warm temperate desert",
            WarmTemperateDesertScrub => "warm temperate desert scrub",
            WarmTemperateThornScrub => "warm temperate thorn scrub",
            WarmTemperateDryForest => "warm temperate dry forest",
            WarmTemperateMoistForest => "warm temperate moist forest",
            WarmTemperateWetForest => "warm temperate wet forest",
            WarmTemperateRainForest => "warm temperate rain forest",
            SubtropicalDesert => "subtropical desert",
            SubtropicalDesertScrub => "subtropical desert scrub",
            SubtropicalThornWoodland => "subtropical thorn woodland",
            SubtropicalDryForest => "subtropical dry forest",
            SubtropicalMoistForest => "subtropical moist forest",
            SubtropicalWetForest => "subtropical wet forest",
            SubtropicalRainForest => "subtropical rain forest",
            TropicalDesert => "tropical desert",
            TropicalDesertScrub => "tropical desert scrub",
            TropicalThornWoodland => "tropical thorn woodland",
            TropicalVeryDryForest => "tropical very dry forest",
            TropicalDryForest => "tropical dry forest",
            TropicalMoistForest => "tropical moist forest",
            TropicalWetForest => "tropical wet forest",
            TropicalRainForest => "tropical rain forest",
        }
    }
}

/// Land-cell classification: one biome for every band pair, no fallthrough.
pub fn classify(temperature: TemperatureLevel, humidity: HumidityLevel) -> Biome {
    use Biome::*;
    use HumidityLevel as H;
    use TemperatureLevel as T;
    match temperature {
        T::Polar => match humidity {
            H::Superarid => PolarDesert,
            _ => Ice,
        },
        T::Alpine => match humidity {
            H::Superarid => SubpolarDryTundra,
            H::Perarid => SubpolarMoistTundra,
            H::Arid => SubpolarWetTundra,
            _ => SubpolarRainTundra,
        },
        T::Boreal => match humidity {
            H::Superarid => BorealDesert,
            H::Perarid => BorealDryScrub,
            H::Arid => BorealMoistForest,
            H::Semiarid => BorealWetForest,
            _ => BorealRainForest,
        },
        T::Cool => match humidity {
            H::Superarid => CoolTemperateDesert,
            H::Perarid => CoolTemperateDesertScrub,
            H::Arid => CoolTemperateSteppe,
            H::Semiarid => CoolTemperateMoistForest,
            H::Subhumid => CoolTemperateWetForest,
            _ => CoolTemperateRainForest,
        },
        T::Warm => match humidity {
            H::Superarid => WarmTemperateDesert,
            H::Perarid => WarmTemperateDesertScrub,
            H::Arid => WarmTemperateThornScrub,
            H::Semiarid => WarmTemperateDryForest,
            H::Subhumid => WarmTemperateMoistForest,
            H::Humid => WarmTemperateWetForest,
            _ => WarmTemperateRainForest,
        },
        T::Subtropical => match humidity {
            H::Superarid => SubtropicalDesert,
            H::Perarid => SubtropicalDesertScrub,
            H::Arid => SubtropicalThornWoodland,
            H::Semiarid => SubtropicalDryForest,
            H::Subhumid => SubtropicalMoistForest,
            H::Humid => SubtropicalWetForest,
            _ => SubtropicalRainForest,
        },
        T::Tropical => match humidity {
            H::Superarid => TropicalDesert,
            H::Perarid => TropicalDesertScrub,
            H::Arid => TropicalThornWoodland,
            H::Semiarid => TropicalVeryDryForest,
            H::Subhumid => TropicalDryForest,
            H::Humid => TropicalMoistForest,
            H::Perhumid => TropicalWetForest,
            H::Superhumid => TropicalRainForest,
        },
    }
}
