//! Net precipitation reaching each sub-area.

use rswmm_core::units::{FloatValue, Time};

use crate::collaborators::{Externals, Precipitation};
use crate::parameters::RunoffSettings;
use crate::subcatchment::Subcatchment;

impl Subcatchment {
    /// Rain plus snowmelt (ft/s) falling on each sub-area kind during a step.
    ///
    /// Sets the subcatchment's rainfall to the total precipitation rate and,
    /// when snowmelt is simulated, its new snow depth.
    pub fn net_precipitation(
        &mut self,
        t_step: Time,
        settings: &RunoffSettings,
        ext: &mut Externals,
    ) -> [FloatValue; 3] {
        let mut precip = self
            .gage
            .map(|g| ext.gages.precipitation(g))
            .unwrap_or_default();
        if let Some(rain) = ext.gages.direct_rainfall(self.index) {
            precip.rain = rain;
        }
        let Precipitation { rain, snow } = precip;

        self.rainfall = rain + snow;

        if self.snowpack && !settings.ignore_snowmelt {
            let melt = ext.snow.snowmelt(self.index, rain, snow, t_step);
            self.new.snow_depth = melt.snow_depth;
            melt.net_precipitation
        } else {
            [rain + snow; 3]
        }
    }
}
