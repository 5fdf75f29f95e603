//! Built-in map geometry. Every coordinate is in the 2810-wide reference frame.

/// Island center points, one per map node, in reading order.
pub const ISLAND_CENTERS: [(f64, f64); 25] = [
    (1404.5, 343.5),
    (1140.5, 607.5),
    (1668.5, 607.5),
    (876.5, 871.5),
    (1404.5, 871.5),
    (1932.5, 871.5),
    (612.5, 1135.5),
    (1140.5, 1135.5),
    (1668.5, 1135.5),
    (2196.5, 1136.0),
    (348.5, 1399.5),
    (876.5, 1399.5),
    (1404.5, 1399.5),
    (1932.5, 1399.0),
    (2460.5, 1400.0),
    (612.5, 1663.5),
    (1140.5, 1663.0),
    (1668.5, 1663.5),
    (2196.5, 1663.0),
    (876.5, 1927.5),
    (1404.5, 1927.5),
    (1932.5, 1928.0),
    (1140.5, 2191.5),
    (1668.5, 2192.0),
    (1404.5, 2455.5),
];

/// Boss and minion probe points per island: `(boss_x, boss_y, minion_x, minion_y)`.
pub const COMBAT_PROBES: [(f64, f64, f64, f64); 25] = [
    (1406.0, 170.0, 1404.0, 494.0),
    (1142.0, 434.0, 1140.0, 758.0),
    (1670.0, 434.0, 1668.0, 758.0),
    (878.0, 698.0, 876.0, 1022.0),
    (1406.0, 698.0, 1404.0, 1022.0),
    (1934.0, 698.0, 1932.0, 1022.0),
    (614.0, 962.0, 612.0, 1286.0),
    (1142.0, 962.0, 1140.0, 1286.0),
    (1670.0, 962.0, 1668.0, 1286.0),
    (2199.0, 963.0, 2196.0, 1287.0),
    (350.0, 1225.0, 348.0, 1550.0),
    (878.0, 1225.0, 876.0, 1550.0),
    (1406.0, 1226.0, 1404.0, 1550.0),
    (1934.0, 1226.0, 1932.0, 1549.0),
    (2462.0, 1226.0, 2460.0, 1550.0),
    (614.0, 1489.0, 612.0, 1814.0),
    (1142.0, 1489.0, 1140.0, 1813.0),
    (1670.0, 1489.0, 1668.0, 1814.0),
    (2199.0, 1489.0, 2196.0, 1813.0),
    (878.0, 1753.0, 876.0, 2077.0),
    (1406.0, 1753.0, 1404.0, 2077.0),
    (1934.0, 1754.0, 1932.0, 2079.0),
    (1142.0, 2017.0, 1140.0, 2340.0),
    (1670.0, 2018.0, 1668.0, 2341.0),
    (1406.0, 2281.0, 1404.0, 2603.0),
];

/// Connector endpoints on the ascending diagonal. `None` where the island has no connector.
pub const ARROWS_A: [Option<[[f64; 2]; 2]>; 25] = [
    None,
    None,
    Some([[1558.0, 497.0], [1515.0, 454.0]]),
    None,
    Some([[1294.0, 761.0], [1251.0, 718.0]]),
    Some([[1822.0, 761.0], [1779.0, 718.0]]),
    None,
    Some([[1030.0, 1025.0], [987.0, 982.0]]),
    Some([[1558.0, 1025.0], [1515.0, 982.0]]),
    Some([[2086.0, 1025.0], [2043.0, 982.0]]),
    None,
    Some([[766.0, 1289.0], [723.0, 1246.0]]),
    Some([[1294.0, 1289.0], [1251.0, 1246.0]]),
    Some([[1822.0, 1289.0], [1779.0, 1246.0]]),
    Some([[2350.0, 1289.0], [2307.0, 1246.0]]),
    Some([[502.0, 1553.0], [459.0, 1510.0]]),
    Some([[1030.0, 1553.0], [987.0, 1510.0]]),
    Some([[1558.0, 1553.0], [1515.0, 1510.0]]),
    Some([[2086.0, 1553.0], [2043.0, 1510.0]]),
    Some([[766.0, 1817.0], [723.0, 1774.0]]),
    Some([[1294.0, 1817.0], [1251.0, 1774.0]]),
    Some([[1822.0, 1817.0], [1779.0, 1774.0]]),
    Some([[1030.0, 2081.0], [987.0, 2038.0]]),
    Some([[1558.0, 2081.0], [1515.0, 2038.0]]),
    Some([[1294.0, 2345.0], [1251.0, 2302.0]]),
];

/// Connector endpoints on the descending diagonal.
pub const ARROWS_D: [Option<[[f64; 2]; 2]>; 25] = [
    None,
    Some([[1251.0, 497.0], [1294.0, 454.0]]),
    None,
    Some([[987.0, 761.0], [1030.0, 718.0]]),
    Some([[1515.0, 761.0], [1558.0, 718.0]]),
    None,
    Some([[723.0, 1025.0], [766.0, 982.0]]),
    Some([[1251.0, 1025.0], [1294.0, 982.0]]),
    Some([[1779.0, 1025.0], [1822.0, 982.0]]),
    None,
    Some([[459.0, 1289.0], [502.0, 1246.0]]),
    Some([[987.0, 1289.0], [1030.0, 1246.0]]),
    Some([[1515.0, 1289.0], [1558.0, 1246.0]]),
    Some([[2043.0, 1289.0], [2086.0, 1246.0]]),
    None,
    Some([[723.0, 1553.0], [766.0, 1510.0]]),
    Some([[1251.0, 1553.0], [1294.0, 1510.0]]),
    Some([[1779.0, 1553.0], [1822.0, 1510.0]]),
    Some([[2307.0, 1553.0], [2350.0, 1510.0]]),
    Some([[987.0, 1817.0], [1030.0, 1774.0]]),
    Some([[1515.0, 1817.0], [1558.0, 1774.0]]),
    Some([[2043.0, 1817.0], [2086.0, 1774.0]]),
    Some([[1251.0, 2081.0], [1294.0, 2038.0]]),
    Some([[1779.0, 2081.0], [1822.0, 2038.0]]),
    Some([[1515.0, 2345.0], [1558.0, 2302.0]]),
];

/// Left and right icon sub-points per island: `(left_x, left_y, right_x, right_y)`.
pub const ICON_POINTS: [(f64, f64, f64, f64); 25] = [
    (1304.0, 343.0, 1504.0, 343.0),
    (1040.0, 607.0, 1240.0, 607.0),
    (1570.0, 607.0, 1770.0, 607.0),
    (776.0, 871.0, 976.0, 871.0),
    (1304.0, 871.0, 1504.0, 871.0),
    (1832.0, 871.0, 2032.0, 871.0),
    (512.0, 1135.0, 712.0, 1135.0),
    (1040.0, 1135.0, 1240.0, 1135.0),
    (1570.0, 1135.0, 1770.0, 1135.0),
    (2098.0, 1135.0, 2298.0, 1135.0),
    (248.0, 1399.0, 448.0, 1399.0),
    (776.0, 1399.0, 976.0, 1399.0),
    (1304.0, 1399.0, 1504.0, 1399.0),
    (1832.0, 1399.0, 2032.0, 1399.0),
    (2360.0, 1399.0, 2560.0, 1399.0),
    (512.0, 1663.0, 712.0, 1663.0),
    (1040.0, 1663.0, 1240.0, 1663.0),
    (1570.0, 1663.0, 1770.0, 1663.0),
    (2098.0, 1663.0, 2298.0, 1663.0),
    (776.0, 1927.0, 976.0, 1927.0),
    (1304.0, 1927.0, 1504.0, 1927.0),
    (1832.0, 1927.0, 2032.0, 1927.0),
    (1040.0, 2191.0, 1240.0, 2191.0),
    (1570.0, 2191.0, 1770.0, 2191.0),
    (1304.0, 2455.0, 1504.0, 2455.0),
];
